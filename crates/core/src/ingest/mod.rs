pub mod datapackage;
