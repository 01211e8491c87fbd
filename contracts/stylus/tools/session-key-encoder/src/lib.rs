//! Off-chain side of the session key protocol: filling and signing operations, wrapping
//! signatures into envelopes, publishing permission trees, plus an in-memory executor.

pub mod encoder;
pub mod executor;
pub mod types;


pub use encoder::{
    enable_module_call_data, enable_new_tree, encode_owner, encode_session,
    execute_batch_call_data, execute_call_data, fill_operation, make_owner_op, make_session_op,
    sign_operation,
};
pub use executor::MockExecutor;
pub use types::{EncoderError, OpContext, OperationDefaults, PartialOperation, SessionGrant};
