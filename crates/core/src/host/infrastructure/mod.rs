pub mod synthetic_host;
