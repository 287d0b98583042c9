pub mod candidate;
pub mod job;
pub mod profile;

pub use candidate::CandidateRecord;
pub use job::{JobRequirement, SeniorityLevel};
pub use profile::{CodeHostingProfile, DataSource, Employment, ProfessionalProfile};
