//! Compile-time generators for the capability table and the action set
//!
//! Both macros expand to plain `match`-based code: every per-capability and
//! per-action procedure is a concrete function, so the codec never goes
//! through dynamic dispatch or runtime type tests.

/// Generate the capability enum, the value snapshot and the marker types.
///
/// Each entry is `bit => Name(field: ValueType)`. Entries must be listed in
/// ascending bit order; `ActionRegistry::build` checks it.
macro_rules! capabilities {
    ($(
        $(#[$meta:meta])*
        $bit:literal => $name:ident($field:ident: $ty:ty)
    ),+ $(,)?) => {
        /// A replicated field group that unrelated actions can opt into
        ///
        /// Each capability owns one bit of a `CapabilitySet` and one slot of
        /// a `SettingsCache`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum Capability {
            $( $(#[$meta])* $name = $bit, )+
        }

        impl Capability {
            /// Every capability in canonical (ascending bit) order
            pub const ALL: &'static [Capability] = &[$(Capability::$name),+];

            /// Number of capabilities
            pub const COUNT: usize = Self::ALL.len();

            /// Bit index of this capability
            pub const fn index(self) -> u8 {
                self as u8
            }

            /// Single-bit mask of this capability
            pub const fn bit(self) -> u32 {
                1u32 << (self as u8)
            }

            /// Look up a capability by bit index
            pub fn from_index(index: u8) -> Option<Capability> {
                match index {
                    $( $bit => Some(Capability::$name), )+
                    _ => None,
                }
            }

            /// Human-readable name
            pub fn name(self) -> &'static str {
                match self {
                    $( Capability::$name => stringify!($name), )+
                }
            }

            /// Encoded size of this capability's value
            pub fn wire_size(self) -> usize {
                match self {
                    $( Capability::$name => <$ty as Wire>::SIZE, )+
                }
            }
        }

        /// One value slot per capability
        ///
        /// Only the slots whose bit is set in the owning collection's flags
        /// carry meaning.
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        pub struct SettingsValues {
            $( pub $field: $ty, )+
        }

        impl SettingsValues {
            /// Distinct non-default values for every slot
            pub fn sentinel() -> Self {
                Self {
                    $( $field: <$ty as CapabilityValue>::sentinel(), )+
                }
            }

            /// Compare one slot against another snapshot within tolerance
            pub fn matches(&self, capability: Capability, other: &SettingsValues) -> bool {
                match capability {
                    $( Capability::$name => self.$field.approx_eq(&other.$field), )+
                }
            }

            /// Copy one slot from another snapshot
            pub fn copy_from(&mut self, capability: Capability, other: &SettingsValues) {
                match capability {
                    $( Capability::$name => self.$field = other.$field, )+
                }
            }

            /// Check that one slot holds no NaN or infinite component
            pub fn is_finite(&self, capability: Capability) -> bool {
                match capability {
                    $( Capability::$name => self.$field.is_finite(), )+
                }
            }

            /// Encode one slot
            pub fn write_value(&self, capability: Capability, writer: &mut WireWriter) {
                match capability {
                    $( Capability::$name => self.$field.ser(writer), )+
                }
            }

            /// Decode one slot in place
            pub fn read_value(
                &mut self,
                capability: Capability,
                reader: &mut WireReader<'_>,
            ) -> levelsync_core::Result<()> {
                match capability {
                    $( Capability::$name => self.$field = <$ty as Wire>::de(reader)?, )+
                }
                Ok(())
            }

            /// Diagnostic rendering of one slot
            pub fn describe(&self, capability: Capability) -> String {
                match capability {
                    $( Capability::$name => format!("{:?}", self.$field), )+
                }
            }
        }

        /// Marker types binding each capability to its value slot
        pub mod caps {
            use super::*;

            $(
                $(#[$meta])*
                #[derive(Debug, Clone, Copy, PartialEq, Eq)]
                pub struct $name;

                impl CapabilityKind for $name {
                    type Value = $ty;
                    const CAPABILITY: Capability = Capability::$name;

                    fn slot(values: &SettingsValues) -> &$ty {
                        &values.$field
                    }

                    fn slot_mut(values: &mut SettingsValues) -> &mut $ty {
                        &mut values.$field
                    }
                }
            )+
        }
    };
}

/// Generate the concrete action structs, `ActionKind`, `ActionBody` and the
/// dispatch between them.
///
/// Each entry is
/// `tag => Name { capabilities { Capability: field, .. } payload { field: Type, .. } }`.
/// Capability fields travel through the settings cache; payload fields are
/// written with every action in declaration order.
macro_rules! actions {
    (@action
        $(#[$meta:meta])*
        $tag:literal => $name:ident {
            capabilities { $($cap:ident: $cfield:ident),* }
            payload { $($(#[$fmeta:meta])* $pfield:ident: $pty:ty),* }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $( pub $cfield: <caps::$cap as CapabilityKind>::Value, )*
            $( $(#[$fmeta])* pub $pfield: $pty, )*
        }

        impl ActionSchema for $name {
            const KIND: ActionKind = ActionKind::$name;
            const CAPABILITIES: CapabilitySet = CapabilitySet::EMPTY $(.with(Capability::$cap))*;
            const PAYLOAD_SIZE: usize = 0 $(+ <$pty as Wire>::SIZE)*;

            #[allow(unreachable_patterns, unused_variables)]
            fn differs(&self, capability: Capability, cached: &SettingsValues) -> bool {
                match capability {
                    $(
                        Capability::$cap => !self
                            .$cfield
                            .approx_eq(<caps::$cap as CapabilityKind>::slot(cached)),
                    )*
                    _ => false,
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn stage(&self, capability: Capability, values: &mut SettingsValues) {
                match capability {
                    $(
                        Capability::$cap => {
                            *<caps::$cap as CapabilityKind>::slot_mut(values) = self.$cfield
                        }
                    )*
                    _ => {}
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn load(&mut self, capability: Capability, values: &SettingsValues) {
                match capability {
                    $(
                        Capability::$cap => {
                            self.$cfield = *<caps::$cap as CapabilityKind>::slot(values)
                        }
                    )*
                    _ => {}
                }
            }

            #[allow(unused_variables)]
            fn write_payload(&self, writer: &mut WireWriter) {
                $( self.$pfield.ser(writer); )*
            }

            #[allow(unused_variables, clippy::needless_update)]
            fn read_payload(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self> {
                Ok(Self {
                    $( $pfield: <$pty as Wire>::de(reader)?, )*
                    ..Self::default()
                })
            }

            fn payload_is_valid(&self) -> bool {
                true $( && PayloadValue::is_valid(&self.$pfield) )*
            }

            #[allow(unused_mut)]
            fn describe(&self) -> String {
                let mut parts: Vec<String> = Vec::new();
                $( parts.push(format!("{}={:?}", stringify!($cfield), self.$cfield)); )*
                $( parts.push(format!("{}={:?}", stringify!($pfield), self.$pfield)); )*
                format!("{} {{ {} }}", stringify!($name), parts.join(", "))
            }
        }

        $(
            impl HasCapability<caps::$cap> for $name {
                fn capability(&self) -> <caps::$cap as CapabilityKind>::Value {
                    self.$cfield
                }

                fn set_capability(&mut self, value: <caps::$cap as CapabilityKind>::Value) {
                    self.$cfield = value;
                }
            }
        )*

        impl From<$name> for ActionBody {
            fn from(action: $name) -> Self {
                ActionBody::$name(action)
            }
        }
    };

    ($(
        $(#[$meta:meta])*
        $tag:literal => $name:ident {
            capabilities { $($cap:ident: $cfield:ident),* $(,)? }
            payload { $($(#[$fmeta:meta])* $pfield:ident: $pty:ty),* $(,)? }
        }
    ),+ $(,)?) => {
        $(
            actions!(@action
                $(#[$meta])*
                $tag => $name {
                    capabilities { $($cap: $cfield),* }
                    payload { $($(#[$fmeta])* $pfield: $pty),* }
                }
            );
        )+

        /// Wire tag of every concrete action
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum ActionKind {
            $( $name = $tag, )+
        }

        impl ActionKind {
            /// Every action kind in declaration order
            pub const ALL: &'static [ActionKind] = &[$(ActionKind::$name),+];

            /// Wire tag
            pub const fn tag(self) -> u8 {
                self as u8
            }

            /// Look up a kind by wire tag
            pub fn from_tag(tag: u8) -> Option<ActionKind> {
                match tag {
                    $( $tag => Some(ActionKind::$name), )+
                    _ => None,
                }
            }

            /// Human-readable name
            pub fn name(self) -> &'static str {
                match self {
                    $( ActionKind::$name => stringify!($name), )+
                }
            }

            /// Capabilities every action of this kind carries
            pub fn capabilities(self) -> CapabilitySet {
                match self {
                    $( ActionKind::$name => <$name as ActionSchema>::CAPABILITIES, )+
                }
            }

            /// Encoded payload size, excluding tag and delta time
            pub fn payload_size(self) -> usize {
                match self {
                    $( ActionKind::$name => <$name as ActionSchema>::PAYLOAD_SIZE, )+
                }
            }

            /// Parameterless factory for this kind
            pub fn factory(self) -> fn() -> ActionBody {
                match self {
                    $( ActionKind::$name => (|| ActionBody::$name($name::default())) as fn() -> ActionBody, )+
                }
            }
        }

        /// Closed set of concrete actions
        #[derive(Debug, Clone, PartialEq)]
        pub enum ActionBody {
            $( $(#[$meta])* $name($name), )+
        }

        impl ActionBody {
            /// Kind of the wrapped action
            pub fn kind(&self) -> ActionKind {
                match self {
                    $( ActionBody::$name(_) => ActionKind::$name, )+
                }
            }

            /// Whether `capability` differs from the cached snapshot
            pub fn differs(&self, capability: Capability, cached: &SettingsValues) -> bool {
                match self {
                    $( ActionBody::$name(action) => action.differs(capability, cached), )+
                }
            }

            /// Copy the action's value for `capability` into `values`
            pub fn stage(&self, capability: Capability, values: &mut SettingsValues) {
                match self {
                    $( ActionBody::$name(action) => action.stage(capability, values), )+
                }
            }

            /// Overwrite the action's value for `capability` from `values`
            pub fn load(&mut self, capability: Capability, values: &SettingsValues) {
                match self {
                    $( ActionBody::$name(action) => action.load(capability, values), )+
                }
            }

            /// Encode the payload fields
            pub fn write_payload(&self, writer: &mut WireWriter) {
                match self {
                    $( ActionBody::$name(action) => action.write_payload(writer), )+
                }
            }

            /// Decode the payload fields of a `kind` action
            pub fn read_payload(
                kind: ActionKind,
                reader: &mut WireReader<'_>,
            ) -> levelsync_core::Result<ActionBody> {
                match kind {
                    $( ActionKind::$name => Ok(ActionBody::$name(<$name as ActionSchema>::read_payload(reader)?)), )+
                }
            }

            /// Structural check of the payload fields
            pub fn payload_is_valid(&self) -> bool {
                match self {
                    $( ActionBody::$name(action) => action.payload_is_valid(), )+
                }
            }

            /// Diagnostic rendering
            pub fn describe(&self) -> String {
                match self {
                    $( ActionBody::$name(action) => action.describe(), )+
                }
            }
        }
    };
}
