pub mod survey;
pub mod types;

pub use survey::{read_survey, read_survey_from, write_survey, SurveyRows};
pub use types::{Customer, DEFAULT_CATEGORY};
