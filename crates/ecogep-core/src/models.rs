pub mod coefficients;
pub mod conversation;
pub mod credential;
pub mod money;
pub mod report;

pub use coefficients::{CoefficientTable, ServiceCoefficients, ServiceKind};
pub use conversation::{ConversationHistory, Role, Turn};
pub use credential::ApiKey;
pub use money::{format_loss, format_money, parse_amount};
pub use report::{
    CalculationProcess, Headline, Meta, ParamExplanation, Simulation, Suggestion,
    ValuationReport,
};
