use crate::error::{ProcessingError, Result};
use crate::utils::constants::{MAX_DEPARTMENT, MIN_DEPARTMENT};

// Corsica is kept under its historical number: 2A/2B are not separate shards.
const DEPARTMENT_NAMES: [&str; 95] = [
    "Ain",
    "Aisne",
    "Allier",
    "Alpes-de-Haute-Provence",
    "Hautes-Alpes",
    "Alpes-Maritimes",
    "Ardèche",
    "Ardennes",
    "Ariège",
    "Aube",
    "Aude",
    "Aveyron",
    "Bouches-du-Rhône",
    "Calvados",
    "Cantal",
    "Charente",
    "Charente-Maritime",
    "Cher",
    "Corrèze",
    "Corse",
    "Côte-d'Or",
    "Côtes-d'Armor",
    "Creuse",
    "Dordogne",
    "Doubs",
    "Drôme",
    "Eure",
    "Eure-et-Loir",
    "Finistère",
    "Gard",
    "Haute-Garonne",
    "Gers",
    "Gironde",
    "Hérault",
    "Ille-et-Vilaine",
    "Indre",
    "Indre-et-Loire",
    "Isère",
    "Jura",
    "Landes",
    "Loir-et-Cher",
    "Loire",
    "Haute-Loire",
    "Loire-Atlantique",
    "Loiret",
    "Lot",
    "Lot-et-Garonne",
    "Lozère",
    "Maine-et-Loire",
    "Manche",
    "Marne",
    "Haute-Marne",
    "Mayenne",
    "Meurthe-et-Moselle",
    "Meuse",
    "Morbihan",
    "Moselle",
    "Nièvre",
    "Nord",
    "Oise",
    "Orne",
    "Pas-de-Calais",
    "Puy-de-Dôme",
    "Pyrénées-Atlantiques",
    "Hautes-Pyrénées",
    "Pyrénées-Orientales",
    "Bas-Rhin",
    "Haut-Rhin",
    "Rhône",
    "Haute-Saône",
    "Saône-et-Loire",
    "Sarthe",
    "Savoie",
    "Haute-Savoie",
    "Paris",
    "Seine-Maritime",
    "Seine-et-Marne",
    "Yvelines",
    "Deux-Sèvres",
    "Somme",
    "Tarn",
    "Tarn-et-Garonne",
    "Var",
    "Vaucluse",
    "Vendée",
    "Vienne",
    "Haute-Vienne",
    "Vosges",
    "Yonne",
    "Territoire de Belfort",
    "Essonne",
    "Hauts-de-Seine",
    "Seine-Saint-Denis",
    "Val-de-Marne",
    "Val-d'Oise",
];

/// Whether the department belongs to mainland France.
pub fn is_mainland(department: u8) -> bool {
    (MIN_DEPARTMENT..=MAX_DEPARTMENT).contains(&department)
}

/// Name of a mainland department
pub fn department_name(department: u8) -> Result<&'static str> {
    if !is_mainland(department) {
        return Err(ProcessingError::UnknownDepartment(department));
    }

    Ok(DEPARTMENT_NAMES[usize::from(department - MIN_DEPARTMENT)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_names() {
        assert_eq!(department_name(1).unwrap(), "Ain");
        assert_eq!(department_name(20).unwrap(), "Corse");
        assert_eq!(department_name(31).unwrap(), "Haute-Garonne");
        assert_eq!(department_name(95).unwrap(), "Val-d'Oise");
    }

    #[test]
    fn test_overseas_departments_rejected() {
        assert!(department_name(0).is_err());
        assert!(department_name(97).is_err());
        assert!(!is_mainland(96));
    }
}
