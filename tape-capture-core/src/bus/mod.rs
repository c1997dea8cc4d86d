pub mod status_bus;
