pub mod read_weekend_pars;
pub mod weekend_opts;
