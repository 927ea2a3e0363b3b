pub mod evaluation_job;
