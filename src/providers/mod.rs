pub mod cp;
