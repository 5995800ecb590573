pub mod chains;
pub mod dashboard;
pub mod health;
pub mod onboarding;
pub mod valuation;
