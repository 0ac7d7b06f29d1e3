pub mod landmask;
pub mod tracks;
