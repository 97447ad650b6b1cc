//! Internal message bundle used for framework-generated error responses

/// Fixed error codes emitted by the request processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCode {
    NoInput,
    ProcessPath,
    NoMapping,
    NotAuthorized,
    ActionCreate,
    ForwardNotFound,
}

impl MessageCode {
    pub fn key(&self) -> &'static str {
        match self {
            MessageCode::NoInput => "noInput",
            MessageCode::ProcessPath => "processPath",
            MessageCode::NoMapping => "noMapping",
            MessageCode::NotAuthorized => "notAuthorized",
            MessageCode::ActionCreate => "actionCreate",
            MessageCode::ForwardNotFound => "forwardNotFound",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            MessageCode::NoInput => "No input attribute for mapping path {0}",
            MessageCode::ProcessPath => "Cannot resolve a mapping path from request URI {0}",
            MessageCode::NoMapping => "Invalid path {0} was requested",
            MessageCode::NotAuthorized => "User is not authorized to access action {0}",
            MessageCode::ActionCreate => "No action instance for path {0} could be created",
            MessageCode::ForwardNotFound => "Forward '{0}' is not configured for mapping path {1}",
        }
    }

    /// Format the message, substituting `{n}` with the n-th argument.
    ///
    /// Arguments are inserted verbatim; placeholders inside them are not expanded.
    pub fn format(&self, args: &[&str]) -> String {
        let template = self.template();
        let mut message = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let arg = after.find('}').and_then(|close| {
                let index: usize = after[..close].parse().ok()?;
                args.get(index).map(|arg| (arg, close))
            });

            match arg {
                Some((arg, close)) => {
                    message.push_str(arg);
                    rest = &after[close + 1..];
                }
                None => {
                    message.push('{');
                    rest = after;
                }
            }
        }

        message.push_str(rest);
        message
    }
}

impl std::fmt::Display for MessageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
