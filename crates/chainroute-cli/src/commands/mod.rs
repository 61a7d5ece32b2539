pub mod analytics;
pub mod init;
pub mod prefs;
pub mod recommend;
pub mod reset;
pub mod route;
pub mod simulate;
pub mod status;
