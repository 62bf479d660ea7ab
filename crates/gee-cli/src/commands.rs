pub mod index;
pub mod init_config;
pub mod run;
