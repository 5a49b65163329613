use crate::args::CallArgs;
use crate::descriptor::EndpointDescriptor;
use crate::error::{Error, Result};

/// Reject any named argument the descriptor does not list. Pure; runs before
/// the request is built.
pub fn validate_params(desc: &EndpointDescriptor, args: &CallArgs) -> Result<()> {
    match args.named().iter().find(|(key, _)| !desc.allows(key)) {
        Some((key, _)) => Err(Error::Parameter {
            param: key.clone(),
            path: desc.path,
        }),
        None => Ok(()),
    }
}
