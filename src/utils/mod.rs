pub mod github_output;
pub mod path_validator;
