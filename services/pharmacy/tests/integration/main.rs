mod account_test;
mod http_test;
