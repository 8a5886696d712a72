pub mod schema_diagram;
