// Analysis pipeline: validate -> fan out to providers -> record -> combine.

pub mod analyze;
