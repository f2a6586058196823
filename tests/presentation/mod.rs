mod config_test;
mod health_api_test;
mod transcription_api_test;
