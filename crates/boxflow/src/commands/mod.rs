pub mod build;
pub mod init;
pub mod mkimage;
pub mod mkremote;
pub mod shutdown;
pub mod up;
