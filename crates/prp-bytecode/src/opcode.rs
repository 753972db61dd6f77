/// Bit that turns an anonymous opcode into its named counterpart.
pub const NAMED_BIT: u8 = 0x20;

/// Upper bound (inclusive) of the byte range the instruction set occupies.
/// Bytes inside this range without an assigned opcode decode to
/// [`Opcode::ErrNoTag`], bytes above it to [`Opcode::ErrUnknown`].
pub const OPCODE_RANGE_END: u8 = 0x3F;

/// Opcodes of the PRP instruction set.
///
/// Every value-carrying opcode has a named form (`code | NAMED_BIT`) whose
/// encoding is preceded by a string reference naming the field. The three
/// end markers only exist in anonymous form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Array = 0x01,
    BeginObject = 0x02,
    Reference = 0x03,
    Container = 0x04,
    Char = 0x05,
    Bool = 0x06,
    Int8 = 0x07,
    Int16 = 0x08,
    Int32 = 0x09,
    Float32 = 0x0A,
    Float64 = 0x0B,
    String = 0x0C,
    RawData = 0x0D,
    Bitfield = 0x0E,
    StringArray = 0x0F,
    EndArray = 0x10,
    EndObject = 0x11,
    EndOfStream = 0x12,

    NamedArray = 0x21,
    BeginNamedObject = 0x22,
    NamedReference = 0x23,
    NamedContainer = 0x24,
    NamedChar = 0x25,
    NamedBool = 0x26,
    NamedInt8 = 0x27,
    NamedInt16 = 0x28,
    NamedInt32 = 0x29,
    NamedFloat32 = 0x2A,
    NamedFloat64 = 0x2B,
    NamedString = 0x2C,
    NamedRawData = 0x2D,
    NamedBitfield = 0x2E,
    NamedStringArray = 0x2F,

    /// Byte inside the opcode range that has no assigned opcode.
    ErrNoTag = 0xFE,
    /// Byte outside the opcode range.
    ErrUnknown = 0xFF,
}

/// Operand layout implied by an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Bool,
    Char,
    Int8,
    Int16,
    Int32,
    /// `u32` element count of an array or container header.
    Capacity,
    /// `u32` bit mask.
    Mask,
    Float32,
    Float64,
    StringRef,
    RawData,
    StringArray,
}

const ALL: [Opcode; 33] = [
    Opcode::Array,
    Opcode::BeginObject,
    Opcode::Reference,
    Opcode::Container,
    Opcode::Char,
    Opcode::Bool,
    Opcode::Int8,
    Opcode::Int16,
    Opcode::Int32,
    Opcode::Float32,
    Opcode::Float64,
    Opcode::String,
    Opcode::RawData,
    Opcode::Bitfield,
    Opcode::StringArray,
    Opcode::EndArray,
    Opcode::EndObject,
    Opcode::EndOfStream,
    Opcode::NamedArray,
    Opcode::BeginNamedObject,
    Opcode::NamedReference,
    Opcode::NamedContainer,
    Opcode::NamedChar,
    Opcode::NamedBool,
    Opcode::NamedInt8,
    Opcode::NamedInt16,
    Opcode::NamedInt32,
    Opcode::NamedFloat32,
    Opcode::NamedFloat64,
    Opcode::NamedString,
    Opcode::NamedRawData,
    Opcode::NamedBitfield,
    Opcode::NamedStringArray,
];

impl Opcode {
    /// Maps a byte to an opcode. Never fails: invalid bytes map to one of
    /// the two sentinels and it is up to the caller to reject them.
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0x01 => Self::Array,
            0x02 => Self::BeginObject,
            0x03 => Self::Reference,
            0x04 => Self::Container,
            0x05 => Self::Char,
            0x06 => Self::Bool,
            0x07 => Self::Int8,
            0x08 => Self::Int16,
            0x09 => Self::Int32,
            0x0A => Self::Float32,
            0x0B => Self::Float64,
            0x0C => Self::String,
            0x0D => Self::RawData,
            0x0E => Self::Bitfield,
            0x0F => Self::StringArray,
            0x10 => Self::EndArray,
            0x11 => Self::EndObject,
            0x12 => Self::EndOfStream,
            0x21 => Self::NamedArray,
            0x22 => Self::BeginNamedObject,
            0x23 => Self::NamedReference,
            0x24 => Self::NamedContainer,
            0x25 => Self::NamedChar,
            0x26 => Self::NamedBool,
            0x27 => Self::NamedInt8,
            0x28 => Self::NamedInt16,
            0x29 => Self::NamedInt32,
            0x2A => Self::NamedFloat32,
            0x2B => Self::NamedFloat64,
            0x2C => Self::NamedString,
            0x2D => Self::NamedRawData,
            0x2E => Self::NamedBitfield,
            0x2F => Self::NamedStringArray,
            b if b <= OPCODE_RANGE_END => Self::ErrNoTag,
            _ => Self::ErrUnknown,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Every valid opcode, anonymous forms first.
    pub fn all() -> &'static [Opcode] {
        &ALL
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::ErrNoTag | Self::ErrUnknown)
    }

    pub fn is_named(self) -> bool {
        !self.is_error() && self.as_u8() & NAMED_BIT != 0
    }

    /// Named counterpart, or `None` for end markers and sentinels.
    pub fn to_named(self) -> Option<Self> {
        if self.is_error() {
            return None;
        }
        if self.is_named() {
            return Some(self);
        }
        match Self::from_u8(self.as_u8() | NAMED_BIT) {
            op if op.is_error() => None,
            op => Some(op),
        }
    }

    /// Anonymous counterpart. Anonymous opcodes and sentinels map to
    /// themselves.
    pub fn to_anonymous(self) -> Self {
        if self.is_named() {
            Self::from_u8(self.as_u8() & !NAMED_BIT)
        } else {
            self
        }
    }

    /// Whether `self` and `other` are the same opcode up to naming.
    pub fn same_kind(self, other: Opcode) -> bool {
        !self.is_error() && self.to_anonymous() == other.to_anonymous()
    }

    pub fn is_begin_object(self) -> bool {
        matches!(self, Self::BeginObject | Self::BeginNamedObject)
    }

    pub fn is_end_marker(self) -> bool {
        matches!(self, Self::EndArray | Self::EndObject | Self::EndOfStream)
    }

    /// Scalars stored inline in the instruction.
    pub fn is_trivial(self) -> bool {
        matches!(
            self.to_anonymous(),
            Self::Char
                | Self::Bool
                | Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Float32
                | Self::Float64
                | Self::Bitfield
        )
    }

    /// Opcodes that open or close a nested region.
    pub fn is_structural(self) -> bool {
        matches!(
            self.to_anonymous(),
            Self::Array
                | Self::BeginObject
                | Self::Container
                | Self::EndArray
                | Self::EndObject
                | Self::EndOfStream
        )
    }

    pub fn operand_kind(self) -> OperandKind {
        match self.to_anonymous() {
            Self::Array | Self::Container => OperandKind::Capacity,
            Self::Reference | Self::String => OperandKind::StringRef,
            Self::Char => OperandKind::Char,
            Self::Bool => OperandKind::Bool,
            Self::Int8 => OperandKind::Int8,
            Self::Int16 => OperandKind::Int16,
            Self::Int32 => OperandKind::Int32,
            Self::Float32 => OperandKind::Float32,
            Self::Float64 => OperandKind::Float64,
            Self::RawData => OperandKind::RawData,
            Self::Bitfield => OperandKind::Mask,
            Self::StringArray => OperandKind::StringArray,
            _ => OperandKind::None,
        }
    }

    /// The tag used by type schemas (`PRPOpCode.<name>`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::BeginObject => "BeginObject",
            Self::Reference => "Reference",
            Self::Container => "Container",
            Self::Char => "Char",
            Self::Bool => "Bool",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::RawData => "RawData",
            Self::Bitfield => "Bitfield",
            Self::StringArray => "StringArray",
            Self::EndArray => "EndArray",
            Self::EndObject => "EndObject",
            Self::EndOfStream => "EndOfStream",
            Self::NamedArray => "NamedArray",
            Self::BeginNamedObject => "BeginNamedObject",
            Self::NamedReference => "NamedReference",
            Self::NamedContainer => "NamedContainer",
            Self::NamedChar => "NamedChar",
            Self::NamedBool => "NamedBool",
            Self::NamedInt8 => "NamedInt8",
            Self::NamedInt16 => "NamedInt16",
            Self::NamedInt32 => "NamedInt32",
            Self::NamedFloat32 => "NamedFloat32",
            Self::NamedFloat64 => "NamedFloat64",
            Self::NamedString => "NamedString",
            Self::NamedRawData => "NamedRawData",
            Self::NamedBitfield => "NamedBitfield",
            Self::NamedStringArray => "NamedStringArray",
            Self::ErrNoTag => "ERR_NO_TAG",
            Self::ErrUnknown => "ERR_UNKNOWN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|op| op.name() == name)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
