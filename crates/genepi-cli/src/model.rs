pub mod fit_result;
