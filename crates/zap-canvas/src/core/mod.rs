pub mod arena;
pub mod descriptor;
pub mod interaction;
pub mod surface;
pub mod time;
pub mod transform;
