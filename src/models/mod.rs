pub mod admin;
pub mod assessment;
pub mod flow;
pub mod proctoring;
pub mod video;
pub mod video_token;
