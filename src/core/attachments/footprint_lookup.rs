//! Legacy footprint path remapping.
//!
//! Early versions shipped the built-in footprint pictures in German named
//! folders. Attachments created back then still point into those folders, so
//! their paths are translated before they are resolved. The translation only
//! kicks in for paths below one of the former top-level folders.

use regex::Regex;
use std::sync::LazyLock;

/// Old folder and file names and their current counterparts
const LEGACY_FOOTPRINT_NAMES: &[(&str, &str)] = &[
    // Top-level folders
    ("Passiv/", "Passive/"),
    ("Aktiv/", "Active/"),
    ("Akustik/", "Acoustics/"),
    ("Elektromechanik/", "Electromechanics/"),
    ("Optik/", "Optics/"),
    // Passive components
    ("Kondensatoren/", "Capacitors/"),
    ("Elektrolytkondensatoren/", "Electrolytic_Capacitors/"),
    ("Elektrolytkondensatoren_axial/", "Electrolytic_Capacitors_Axial/"),
    ("Elektrolytkondensatoren_radial/", "Electrolytic_Capacitors_Radial/"),
    ("Folienkondensatoren/", "Film_Capacitors/"),
    ("Keramikkondensatoren/", "Ceramic_Capacitors/"),
    ("Tantalkondensatoren/", "Tantalum_Capacitors/"),
    ("Widerstaende/", "Resistors/"),
    ("Widerstaende_axial/", "Resistors_Axial/"),
    ("Widerstaende_radial/", "Resistors_Radial/"),
    ("Widerstandsnetzwerke/", "Resistor_Networks/"),
    ("Potentiometer/", "Potentiometers/"),
    ("Spulen/", "Inductors/"),
    ("Drosseln/", "Chokes/"),
    ("Ferrite/", "Ferrites/"),
    ("Sicherungen/", "Fuses/"),
    ("Quarze/", "Crystals/"),
    ("Oszillatoren/", "Oscillators/"),
    ("Varistoren/", "Varistors/"),
    ("Thermistoren/", "Thermistors/"),
    // Active components
    ("Dioden/", "Diodes/"),
    ("Gleichrichter/", "Rectifiers/"),
    ("Zenerdioden/", "Zener_Diodes/"),
    ("Transistoren/", "Transistors/"),
    ("Spannungsregler/", "Voltage_Regulators/"),
    ("Integrierte_Schaltungen/", "Integrated_Circuits/"),
    ("Optokoppler/", "Optocouplers/"),
    ("Thyristoren/", "Thyristors/"),
    ("Triacs/", "Triacs/"),
    // Acoustics
    ("Lautsprecher/", "Speakers/"),
    ("Summer/", "Buzzers/"),
    ("Mikrofone/", "Microphones/"),
    // Electromechanics
    ("Relais/", "Relays/"),
    ("Schalter/", "Switches/"),
    ("Taster/", "Buttons/"),
    ("Steckverbinder/", "Connectors/"),
    ("Klemmen/", "Terminals/"),
    ("Buchsen/", "Sockets/"),
    ("Stecker/", "Plugs/"),
    ("Sockel/", "IC_Sockets/"),
    ("Luefter/", "Fans/"),
    ("Motoren/", "Motors/"),
    ("Kuehlkoerper/", "Heatsinks/"),
    ("Batteriehalter/", "Battery_Holders/"),
    // Optics
    ("Leuchtdioden/", "LEDs/"),
    ("LEDs_bedrahtet/", "LEDs_THT/"),
    ("Anzeigen/", "Displays/"),
    ("Siebensegmentanzeigen/", "Seven_Segment_Displays/"),
    ("Lichtleiter/", "Light_Guides/"),
    ("Fototransistoren/", "Phototransistors/"),
    ("Fotodioden/", "Photodiodes/"),
    // File name prefixes
    ("KONDENSATOR_", "CAPACITOR_"),
    ("ELKO_", "ELECTROLYTIC_"),
    ("WIDERSTAND_", "RESISTOR_"),
    ("DIODE_", "DIODE_"),
    ("SPULE_", "INDUCTOR_"),
    ("SICHERUNG_", "FUSE_"),
    ("QUARZ_", "CRYSTAL_"),
    ("RELAIS_", "RELAY_"),
    ("SCHALTER_", "SWITCH_"),
    ("TASTER_", "BUTTON_"),
    ("LAUTSPRECHER_", "SPEAKER_"),
    ("SUMMER_", "BUZZER_"),
    ("_bedrahtet", "_THT"),
    ("_stehend", "_vertical"),
    ("_liegend", "_horizontal"),
];

static LEGACY_PATH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"%FOOTPRINTS%/(Passiv|Aktiv|Akustik|Elektromechanik|Optik)/").ok()
});

/// Alternation of all legacy names, longest first so the longest key wins at
/// every position.
static LEGACY_NAMES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let mut keys: Vec<&str> = LEGACY_FOOTPRINT_NAMES.iter().map(|(k, _)| *k).collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let pattern = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).ok()
});

fn english_name(legacy: &str) -> Option<&'static str> {
    LEGACY_FOOTPRINT_NAMES
        .iter()
        .find(|(k, _)| *k == legacy)
        .map(|(_, v)| *v)
}

/// Checks whether a path points into one of the legacy footprint folders.
#[must_use]
pub fn is_legacy_footprint_path(path: &str) -> bool {
    LEGACY_PATH.as_ref().is_some_and(|re| re.is_match(path))
}

/// Translates a legacy footprint path. Paths outside the legacy folders are
/// returned unchanged.
#[must_use]
pub fn convert_legacy_path(path: &str) -> String {
    if !is_legacy_footprint_path(path) {
        return path.to_string();
    }
    let Some(names) = LEGACY_NAMES.as_ref() else {
        return path.to_string();
    };

    names
        .replace_all(path, |caps: &regex::Captures<'_>| {
            english_name(&caps[0]).unwrap_or_default().to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_paths_are_translated() {
        assert_eq!(
            convert_legacy_path("%FOOTPRINTS%/Passiv/Kondensatoren/ELKO_RADIAL_5MM.png"),
            "%FOOTPRINTS%/Passive/Capacitors/ELECTROLYTIC_RADIAL_5MM.png"
        );
        assert_eq!(
            convert_legacy_path("%FOOTPRINTS%/Aktiv/Transistoren/TO92.png"),
            "%FOOTPRINTS%/Active/Transistors/TO92.png"
        );
    }

    #[test]
    fn test_longest_key_wins() {
        assert_eq!(
            convert_legacy_path("%FOOTPRINTS%/Passiv/Widerstaende_axial/WIDERSTAND_0207.png"),
            "%FOOTPRINTS%/Passive/Resistors_Axial/RESISTOR_0207.png"
        );
    }

    #[test]
    fn test_current_paths_are_left_alone() {
        let current = "%FOOTPRINTS%/Passive/Capacitors/CAPACITOR_0805.png";
        assert!(!is_legacy_footprint_path(current));
        assert_eq!(convert_legacy_path(current), current);

        // German folder names outside the footprint directory are not touched
        let media = "%MEDIA%/Passiv/Kondensatoren/foo.png";
        assert_eq!(convert_legacy_path(media), media);
    }
}
