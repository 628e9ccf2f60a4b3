/// Known hearing list types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListType {
    pub id: i32,
    pub name: &'static str,
    pub english_friendly_name: &'static str,
    pub welsh_friendly_name: &'static str,
}

pub const LIST_TYPES: &[ListType] = &[
    ListType {
        id: 1,
        name: "CIVIL_DAILY_CAUSE_LIST",
        english_friendly_name: "Civil Daily Cause List",
        welsh_friendly_name: "Rhestr Achosion Dyddiol Sifil",
    },
    ListType {
        id: 2,
        name: "FAMILY_DAILY_CAUSE_LIST",
        english_friendly_name: "Family Daily Cause List",
        welsh_friendly_name: "Rhestr Achosion Dyddiol Teulu",
    },
    ListType {
        id: 3,
        name: "CROWN_DAILY_LIST",
        english_friendly_name: "Crown Daily List",
        welsh_friendly_name: "Rhestr Ddyddiol Llys y Goron",
    },
    ListType {
        id: 4,
        name: "CROWN_FIRM_LIST",
        english_friendly_name: "Crown Firm List",
        welsh_friendly_name: "Rhestr Bendant Llys y Goron",
    },
    ListType {
        id: 5,
        name: "MAGISTRATES_PUBLIC_LIST",
        english_friendly_name: "Magistrates Public List",
        welsh_friendly_name: "Rhestr Gyhoeddus y Llys Ynadon",
    },
    ListType {
        id: 6,
        name: "CIVIL_AND_FAMILY_DAILY_CAUSE_LIST",
        english_friendly_name: "Civil and Family Daily Cause List",
        welsh_friendly_name: "Rhestr Achosion Dyddiol Sifil a Theulu",
    },
    ListType {
        id: 7,
        name: "SJP_PUBLIC_LIST",
        english_friendly_name: "Single Justice Procedure Public List",
        welsh_friendly_name: "Rhestr Gyhoeddus y Weithdrefn Un Ynad",
    },
    ListType {
        id: 8,
        name: "SJP_PRESS_LIST",
        english_friendly_name: "Single Justice Procedure Press List",
        welsh_friendly_name: "Rhestr y Wasg y Weithdrefn Un Ynad",
    },
    ListType {
        id: 9,
        name: "CARE_STANDARDS_LIST",
        english_friendly_name: "Care Standards Tribunal Hearing List",
        welsh_friendly_name: "Rhestr Gwrandawiadau'r Tribiwnlys Safonau Gofal",
    },
    ListType {
        id: 10,
        name: "EMPLOYMENT_TRIBUNALS_DAILY_LIST",
        english_friendly_name: "Employment Tribunals Daily List",
        welsh_friendly_name: "Rhestr Ddyddiol y Tribiwnlysoedd Cyflogaeth",
    },
];

pub fn find_list_type(list_type_id: i32) -> Option<&'static ListType> {
    LIST_TYPES.iter().find(|list_type| list_type.id == list_type_id)
}

/// English name for emails and logs, `LIST_TYPE_<id>` when the id is unknown
pub fn list_type_display_name(list_type_id: i32) -> String {
    find_list_type(list_type_id)
        .map(|list_type| list_type.english_friendly_name.to_string())
        .unwrap_or_else(|| format!("LIST_TYPE_{}", list_type_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_list_type_name() {
        assert_eq!(list_type_display_name(3), "Crown Daily List");
    }

    #[test]
    fn test_unknown_list_type_falls_back() {
        assert_eq!(list_type_display_name(999), "LIST_TYPE_999");
    }

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in LIST_TYPES.iter().enumerate() {
            assert!(LIST_TYPES[i + 1..].iter().all(|b| b.id != a.id));
        }
    }
}
