pub mod delay;
pub mod distortion;
pub mod filter;
pub mod gate;
pub mod pitch;
pub mod radio;
pub mod reverb;
