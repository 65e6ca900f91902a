use std::fmt;

/// Physical quantity a unit measures; conversions only work within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Length,
    Mass,
    Time,
    Angle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDef {
    pub name: &'static str,
    pub quantity: Quantity,
    /// Multiplier to the base unit of the quantity (m, kg, s, rad).
    pub scale: f64,
}

const UNITS: &[UnitDef] = &[
    UnitDef { name: "m", quantity: Quantity::Length, scale: 1.0 },
    UnitDef { name: "meter", quantity: Quantity::Length, scale: 1.0 },
    UnitDef { name: "km", quantity: Quantity::Length, scale: 1000.0 },
    UnitDef { name: "cm", quantity: Quantity::Length, scale: 0.01 },
    UnitDef { name: "mm", quantity: Quantity::Length, scale: 0.001 },
    UnitDef { name: "in", quantity: Quantity::Length, scale: 0.0254 },
    UnitDef { name: "inch", quantity: Quantity::Length, scale: 0.0254 },
    UnitDef { name: "ft", quantity: Quantity::Length, scale: 0.3048 },
    UnitDef { name: "foot", quantity: Quantity::Length, scale: 0.3048 },
    UnitDef { name: "mi", quantity: Quantity::Length, scale: 1609.344 },
    UnitDef { name: "mile", quantity: Quantity::Length, scale: 1609.344 },
    UnitDef { name: "kg", quantity: Quantity::Mass, scale: 1.0 },
    UnitDef { name: "g", quantity: Quantity::Mass, scale: 0.001 },
    UnitDef { name: "gram", quantity: Quantity::Mass, scale: 0.001 },
    UnitDef { name: "lb", quantity: Quantity::Mass, scale: 0.45359237 },
    UnitDef { name: "s", quantity: Quantity::Time, scale: 1.0 },
    UnitDef { name: "sec", quantity: Quantity::Time, scale: 1.0 },
    UnitDef { name: "ms", quantity: Quantity::Time, scale: 0.001 },
    UnitDef { name: "minute", quantity: Quantity::Time, scale: 60.0 },
    UnitDef { name: "hour", quantity: Quantity::Time, scale: 3600.0 },
    UnitDef { name: "day", quantity: Quantity::Time, scale: 86400.0 },
    UnitDef { name: "rad", quantity: Quantity::Angle, scale: 1.0 },
    UnitDef { name: "deg", quantity: Quantity::Angle, scale: std::f64::consts::PI / 180.0 },
];

pub fn find_unit(name: &str) -> Option<&'static UnitDef> {
    UNITS.iter().find(|u| u.name == name)
}

pub fn is_unit_name(name: &str) -> bool {
    find_unit(name).is_some()
}

/// A value with a unit. The magnitude is stored in the base unit of the
/// quantity; `unit` only determines how it is displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub value: f64,
    pub unit: &'static UnitDef,
}

impl Unit {
    /// `value` is expressed in `unit`, e.g. `Unit::new(5.0, "cm")`.
    pub fn new(value: f64, name: &str) -> Result<Unit, String> {
        let unit = find_unit(name).ok_or_else(|| format!("Unknown unit \"{name}\""))?;
        Ok(Unit {
            value: value * unit.scale,
            unit,
        })
    }

    /// The magnitude expressed in the display unit.
    pub fn to_number(&self) -> f64 {
        self.value / self.unit.scale
    }

    /// Re-express in another unit of the same quantity.
    pub fn to(&self, name: &str) -> Result<Unit, String> {
        let target = find_unit(name).ok_or_else(|| format!("Unknown unit \"{name}\""))?;
        if target.quantity != self.unit.quantity {
            return Err(format!(
                "Units do not match ('{}' != '{}')",
                self.unit.name, target.name
            ));
        }
        Ok(Unit {
            value: self.value,
            unit: target,
        })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", crate::format_number(self.to_number()), self.unit.name)
    }
}
