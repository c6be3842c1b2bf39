pub mod home;
pub mod info;
pub mod inventory;
pub mod inverters;
pub mod login;
pub mod production;
