pub mod assessment_service;
pub mod auth_service;
pub mod proctoring_service;
pub mod scoring_service;
pub mod storage_service;
pub mod token_service;
pub mod video_service;
