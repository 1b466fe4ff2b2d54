//! different utility modules used throughout the project
/// logger setup: terminal and optional log file
pub mod logger;
/// parse document with structure like " title1 key1: value1, value2 key2: value2 title2 key3:value3, value4" into HashMap
pub mod task_parser;
/// typed solver settings read from a settings document
pub mod solver_settings;
/// rounding of results to the precision implied by a tolerance
pub mod formatting;
/// pretty tables of solver statistics
pub mod statistics;
/// random linear systems and noisy data for demos and tests
pub mod data_generation;
