pub use scolaris_models::students::{
    PublicStudentResult, PublicStudentRow, SubjectAverage, round2, weighted_average,
};
