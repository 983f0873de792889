pub mod application;
pub mod company;
pub mod interview;
pub mod job;
pub mod notification;
pub mod user;
