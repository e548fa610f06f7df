mod activity;
mod challenge;
mod happening;
mod media;
mod review;
mod user;

pub use activity::*;
pub use challenge::*;
pub use happening::*;
pub use media::*;
pub use review::*;
pub use user::*;
