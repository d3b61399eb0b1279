mod common;
mod correlativity;
