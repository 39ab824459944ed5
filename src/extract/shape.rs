//! The call shapes the extractor knows how to instrument.

use crate::analysis::{MethodSignature, TypeRef};
use crate::error::ShapeError;

/// A method signature recognized as an RPC call.
///
/// Extraction tries every variant and rejects signatures that match none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallShape {
    /// `M(ctx, *Envelope[Req]) (*Envelope[Res], error)`
    UnaryEnvelope { request: TypeRef, response: TypeRef },
}

impl CallShape {
    /// Classify a method signature.
    pub fn classify(method: &MethodSignature) -> Result<Self, ShapeError> {
        Self::unary_envelope(method)
    }

    fn unary_envelope(method: &MethodSignature) -> Result<Self, ShapeError> {
        if method.params.len() != 2 {
            return Err(ShapeError::ParameterCount(method.params.len()));
        }
        if method.results.len() != 2 {
            return Err(ShapeError::ResultCount(method.results.len()));
        }

        let request_param = &method.params[1].ty;
        let request = envelope_payload(request_param)
            .ok_or_else(|| ShapeError::RequestNotEnveloped(request_param.to_string()))?;

        let response_result = &method.results[0].ty;
        let response = envelope_payload(response_result)
            .ok_or_else(|| ShapeError::ResponseNotEnveloped(response_result.to_string()))?;

        let error_slot = &method.results[1].ty;
        if !error_slot.is_error() {
            return Err(ShapeError::MissingErrorSlot(error_slot.to_string()));
        }

        Ok(CallShape::UnaryEnvelope {
            request: request.clone(),
            response: response.clone(),
        })
    }

    /// The request payload type.
    pub fn request(&self) -> &TypeRef {
        match self {
            CallShape::UnaryEnvelope { request, .. } => request,
        }
    }

    /// The response payload type.
    pub fn response(&self) -> &TypeRef {
        match self {
            CallShape::UnaryEnvelope { response, .. } => response,
        }
    }
}

/// Match `*Envelope[Payload]` and return `Payload`.
fn envelope_payload(ty: &TypeRef) -> Option<&TypeRef> {
    let TypeRef::Pointer(inner) = ty else {
        return None;
    };
    let TypeRef::Generic { base, args } = inner.as_ref() else {
        return None;
    };
    if !matches!(base.as_ref(), TypeRef::Named { .. }) {
        return None;
    }
    match args.as_slice() {
        [payload @ TypeRef::Named { .. }] => Some(payload),
        _ => None,
    }
}
