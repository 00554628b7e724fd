pub mod support;

mod poller_test;
