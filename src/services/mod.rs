pub mod aqi_api;
