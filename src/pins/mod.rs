//! Pin resolution: from a port's raw pins to the literal strings written into
//! Klipper config files.
//!
//! Resolution is pure. It reads a [`Port`], the consuming function, and a
//! [`ResolveContext`], and never touches session state.
//!
//! # Canonical form
//!
//! ```text
//! [^][!][toolboard:]PIN
//! ```
//!
//! Pull-up comes first, inversion sits next to the (prefixed) pin. This is the
//! order Klipper's pin parser reads modifiers in.

use crate::error::{ConfigError, ConfigResult};
use crate::models::{
    BoardRole, LogicalFunction, PinAttribute, PinOptions, PinSet, Port, ResolvedPins,
};

/// Literal substituted for pins that are not assigned yet.
pub const PLACEHOLDER_PIN: &str = "REPLACE_PIN";

/// Modifier flags applied to one raw pin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinModifiers {
    /// Enable the internal pull-up (`^`)
    pub pullup: bool,
    /// Invert the line (`!`)
    pub invert: bool,
}

impl PinModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        pullup: false,
        invert: false,
    };

    /// Inverted line.
    pub const INVERTED: Self = Self {
        pullup: false,
        invert: true,
    };

    /// Pulled-up line.
    pub const PULLUP: Self = Self {
        pullup: true,
        invert: false,
    };
}

/// Inputs resolution depends on besides the port itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveContext {
    /// Board role the port lives on
    pub role: BoardRole,
    /// User pin options of the consuming function
    pub options: PinOptions,
}

impl ResolveContext {
    /// Context with default options.
    #[must_use]
    pub fn new(role: BoardRole) -> Self {
        Self {
            role,
            options: PinOptions::default(),
        }
    }

    /// Sets the function's pin options.
    #[must_use]
    pub const fn with_options(mut self, options: PinOptions) -> Self {
        self.options = options;
        self
    }
}

/// Formats one pin in canonical order.
#[must_use]
pub fn format_pin(role: BoardRole, raw: &str, modifiers: PinModifiers) -> String {
    let mut pin = String::with_capacity(raw.len() + 12);
    if modifiers.pullup {
        pin.push('^');
    }
    if modifiers.invert {
        pin.push('!');
    }
    if let Some(mcu) = role.mcu_prefix() {
        pin.push_str(mcu);
        pin.push(':');
    }
    pin.push_str(raw);
    pin
}

/// Resolves a single attribute of a port.
///
/// Fails with `AttributeUnavailable` when the port does not wire it.
pub fn resolve_attribute(
    port: &Port,
    attribute: PinAttribute,
    role: BoardRole,
    modifiers: PinModifiers,
) -> ConfigResult<String> {
    let raw = port
        .pins
        .raw(attribute)
        .ok_or_else(|| ConfigError::AttributeUnavailable {
            port_id: port.id.clone(),
            attribute,
        })?;
    Ok(format_pin(role, raw, modifiers))
}

/// One attribute a function reads from its port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinRequest {
    /// Attribute to read
    pub attribute: PinAttribute,
    /// Modifiers to apply
    pub modifiers: PinModifiers,
    /// Whether resolution fails if the port lacks it
    pub required: bool,
}

impl PinRequest {
    const fn required(attribute: PinAttribute, modifiers: PinModifiers) -> Self {
        Self {
            attribute,
            modifiers,
            required: true,
        }
    }

    const fn optional(attribute: PinAttribute, modifiers: PinModifiers) -> Self {
        Self {
            attribute,
            modifiers,
            required: false,
        }
    }
}

/// Attributes a function reads from a port with the given pin set.
#[must_use]
pub fn pin_requests(function: LogicalFunction, pins: &PinSet, options: PinOptions) -> Vec<PinRequest> {
    let pullup = function.needs_pullup() && !options.suppress_pullup;
    let primary = PinModifiers {
        pullup,
        invert: options.invert,
    };

    match pins {
        PinSet::Motor(_) => vec![
            PinRequest::required(PinAttribute::Step, PinModifiers::NONE),
            PinRequest::required(
                PinAttribute::Dir,
                PinModifiers {
                    pullup: false,
                    invert: options.invert,
                },
            ),
            // Driver enable lines are active-low.
            PinRequest::required(PinAttribute::Enable, PinModifiers::INVERTED),
            PinRequest::optional(PinAttribute::Uart, PinModifiers::NONE),
            PinRequest::optional(PinAttribute::Cs, PinModifiers::NONE),
            PinRequest::optional(PinAttribute::Diag, PinModifiers::PULLUP),
        ],
        PinSet::Probe { .. } => vec![
            PinRequest::required(PinAttribute::Signal, primary),
            PinRequest::optional(PinAttribute::Servo, PinModifiers::NONE),
        ],
        PinSet::Simple { .. } => vec![PinRequest::required(PinAttribute::Pin, primary)],
    }
}

/// Resolves every pin a function reads from a port.
pub fn resolve(
    port: &Port,
    function: LogicalFunction,
    context: ResolveContext,
) -> ConfigResult<ResolvedPins> {
    let mut resolved = ResolvedPins::new();
    for request in pin_requests(function, &port.pins, context.options) {
        match resolve_attribute(port, request.attribute, context.role, request.modifiers) {
            Ok(pin) => resolved.insert(request.attribute, pin),
            Err(err) if request.required => return Err(err),
            Err(_) => {}
        }
    }
    Ok(resolved)
}
