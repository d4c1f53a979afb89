pub mod action;
pub mod torrent;
pub mod transfer;
