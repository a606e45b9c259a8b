use fcommon::ParamBag;

use crate::{Message, ModelOptions};

/// One model turn: the ordered messages, the options, and a per-call parameter bag.
///
/// Messages and options are fixed at construction. Derived requests are built with
/// [`ChatRequest::with_messages`], which clones the parameter bag.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    messages: Vec<Message>,
    options: ModelOptions,
    params: ParamBag,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, options: ModelOptions) -> Self {
        Self {
            messages,
            options,
            params: ParamBag::new(),
        }
    }

    pub fn with_params(mut self, params: ParamBag) -> Self {
        self.params = params;
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    /// Builds a sibling request with different messages, the same options, and a cloned
    /// parameter bag.
    pub fn with_messages(&self, messages: Vec<Message>) -> Self {
        Self {
            messages,
            options: self.options.clone(),
            params: self.params.clone(),
        }
    }

    pub fn into_parts(self) -> (Vec<Message>, ModelOptions, ParamBag) {
        (self.messages, self.options, self.params)
    }
}
