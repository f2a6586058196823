mod transcription_pipeline_test;
