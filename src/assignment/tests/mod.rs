//! Unit and service tests for the assignment engine.


mod cascade_tests;
