//! Calculator inputs and the clamping applied before the engine sees them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpsInput {
    pub cpu_count: u32,
    pub ram_gb: u32,
    pub storage_gb: u32,
    pub vm_count: u32,
    pub baas_backup_gb: u32,
}

impl VpsInput {
    pub const MIN_CPU_COUNT: u32 = 1;
    pub const MIN_STORAGE_GB: u32 = 10;

    /// Raises every field to its floor. RAM can never be below one GB per CPU.
    pub fn clamped(self) -> Self {
        let cpu_count = self.cpu_count.max(Self::MIN_CPU_COUNT);
        Self {
            cpu_count,
            ram_gb: self.ram_gb.max(cpu_count),
            storage_gb: self.storage_gb.max(Self::MIN_STORAGE_GB),
            vm_count: self.vm_count,
            baas_backup_gb: self.baas_backup_gb,
        }
    }

    pub fn from_form(form: &VpsForm) -> Self {
        let cpu_count = parse_count(&form.cpu_count, Self::MIN_CPU_COUNT);
        Self {
            cpu_count,
            ram_gb: parse_count(&form.ram_gb, cpu_count),
            storage_gb: parse_count(&form.storage_gb, Self::MIN_STORAGE_GB),
            vm_count: parse_count(&form.vm_count, 0),
            baas_backup_gb: parse_count(&form.baas_backup_gb, 0),
        }
    }
}

impl Default for VpsInput {
    fn default() -> Self {
        Self { cpu_count: 1, ram_gb: 4, storage_gb: 50, vm_count: 1, baas_backup_gb: 0 }
    }
}

/// Raw text as typed into the VPS calculator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpsForm {
    pub cpu_count: String,
    pub ram_gb: String,
    pub storage_gb: String,
    pub vm_count: String,
    pub baas_backup_gb: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Server,
    Workstation,
}

impl std::str::FromStr for DeviceType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "workstation" => Ok(Self::Workstation),
            other => Err(format!("unsupported device type `{other}` (expected server|workstation)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaasInput {
    PerGb { gigabytes: u32 },
    PerDevice { device: DeviceType, count: u32 },
}

impl BaasInput {
    pub fn clamped(self) -> Self {
        match self {
            Self::PerGb { gigabytes } => Self::PerGb { gigabytes: gigabytes.max(1) },
            Self::PerDevice { device, count } => Self::PerDevice { device, count: count.max(1) },
        }
    }

    pub fn per_gb_from_text(gigabytes: &str) -> Self {
        Self::PerGb { gigabytes: parse_count(gigabytes, 1) }
    }

    pub fn per_device_from_text(device: DeviceType, count: &str) -> Self {
        Self::PerDevice { device, count: parse_count(count, 1) }
    }
}

/// Reads a whole count from user text, never returning less than `min`.
///
/// Leading digits are honoured (`"12GB"` reads as 12), fractional values truncate, and
/// anything without a leading number (including `NaN`, empty input and negative values
/// after clamping) becomes `min`.
pub fn parse_count(raw: &str, min: u32) -> u32 {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let leading: String = digits.chars().take_while(char::is_ascii_digit).collect();
    if leading.is_empty() || negative {
        return min;
    }

    leading.parse::<u32>().unwrap_or(u32::MAX).max(min)
}

#[cfg(test)]
mod tests {
    use super::{parse_count, BaasInput, DeviceType, VpsForm, VpsInput};

    #[test]
    fn parse_count_clamps_to_floor() {
        assert_eq!(parse_count("8", 1), 8);
        assert_eq!(parse_count(" 12GB ", 1), 12);
        assert_eq!(parse_count("2.9", 1), 2);
        assert_eq!(parse_count("0", 1), 1);
        assert_eq!(parse_count("-4", 0), 0);
        assert_eq!(parse_count("abc", 10), 10);
        assert_eq!(parse_count("", 10), 10);
        assert_eq!(parse_count("NaN", 0), 0);
        assert_eq!(parse_count("99999999999999", 0), u32::MAX);
    }

    #[test]
    fn form_parsing_floors_ram_at_cpu_count() {
        let input = VpsInput::from_form(&VpsForm {
            cpu_count: "4".to_string(),
            ram_gb: "2".to_string(),
            storage_gb: "5".to_string(),
            vm_count: "oops".to_string(),
            baas_backup_gb: "-3".to_string(),
        });

        assert_eq!(
            input,
            VpsInput { cpu_count: 4, ram_gb: 4, storage_gb: 10, vm_count: 0, baas_backup_gb: 0 }
        );
    }

    #[test]
    fn non_numeric_cpu_count_becomes_one() {
        let input = VpsInput::from_form(&VpsForm {
            cpu_count: "x".to_string(),
            ram_gb: "".to_string(),
            ..VpsForm::default()
        });
        assert_eq!(input.cpu_count, 1);
        assert_eq!(input.ram_gb, 1);
        assert_eq!(input.storage_gb, 10);
    }

    #[test]
    fn clamped_raises_typed_values() {
        let input = VpsInput { cpu_count: 0, ram_gb: 0, storage_gb: 0, vm_count: 0, baas_backup_gb: 0 }
            .clamped();
        assert_eq!(input.cpu_count, 1);
        assert_eq!(input.ram_gb, 1);
        assert_eq!(input.storage_gb, 10);
    }

    #[test]
    fn baas_inputs_have_a_floor_of_one() {
        assert_eq!(BaasInput::per_gb_from_text("0"), BaasInput::PerGb { gigabytes: 1 });
        assert_eq!(
            BaasInput::PerDevice { device: DeviceType::Server, count: 0 }.clamped(),
            BaasInput::PerDevice { device: DeviceType::Server, count: 1 }
        );
        assert_eq!("Workstation".parse::<DeviceType>(), Ok(DeviceType::Workstation));
    }
}
