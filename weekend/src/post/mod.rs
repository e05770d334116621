pub mod race_result;
