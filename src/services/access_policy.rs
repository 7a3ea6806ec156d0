use crate::db::types::{EnrollmentStatus, UserRole};

/// What the caller is to a given course offering, resolved from the role
/// column plus the roster tables before any access decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OfferingRelation {
    Admin,
    Staff,
    EnrolledStudent,
    None,
}

pub(crate) fn resolve_relation(
    role: UserRole,
    is_staff_of_offering: bool,
    enrollment_status: Option<EnrollmentStatus>,
) -> OfferingRelation {
    if role == UserRole::Admin {
        return OfferingRelation::Admin;
    }
    if role.is_staff() && is_staff_of_offering {
        return OfferingRelation::Staff;
    }
    if role == UserRole::Student && enrollment_status == Some(EnrollmentStatus::Active) {
        return OfferingRelation::EnrolledStudent;
    }
    OfferingRelation::None
}

/// Create, edit, publish and delete assessments; see drafts.
pub(crate) fn can_manage_assessments(relation: OfferingRelation) -> bool {
    matches!(relation, OfferingRelation::Admin | OfferingRelation::Staff)
}

/// Read other students' submissions and attempts; attach grades.
pub(crate) fn can_grade(relation: OfferingRelation) -> bool {
    matches!(relation, OfferingRelation::Admin | OfferingRelation::Staff)
}

/// See published assessments and submit own work. Dropped and waitlisted
/// students fall through to `None` in `resolve_relation` and lose this.
pub(crate) fn can_participate(relation: OfferingRelation) -> bool {
    matches!(relation, OfferingRelation::EnrolledStudent)
}

pub(crate) fn can_view_offering(relation: OfferingRelation) -> bool {
    !matches!(relation, OfferingRelation::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_outranks_roster_state() {
        let relation = resolve_relation(UserRole::Admin, false, None);
        assert_eq!(relation, OfferingRelation::Admin);
        assert!(can_manage_assessments(relation));
        assert!(can_grade(relation));
    }

    #[test]
    fn staff_role_alone_is_not_enough() {
        let relation = resolve_relation(UserRole::Professor, false, None);
        assert_eq!(relation, OfferingRelation::None);
        assert!(!can_manage_assessments(relation));
    }

    #[test]
    fn assigned_staff_can_manage_but_not_participate() {
        let relation = resolve_relation(UserRole::AssociateTeacher, true, None);
        assert_eq!(relation, OfferingRelation::Staff);
        assert!(can_manage_assessments(relation));
        assert!(can_grade(relation));
        assert!(!can_participate(relation));
    }

    #[test]
    fn only_active_enrollment_grants_participation() {
        let active = resolve_relation(UserRole::Student, false, Some(EnrollmentStatus::Active));
        assert!(can_participate(active));
        assert!(!can_manage_assessments(active));

        let dropped = resolve_relation(UserRole::Student, false, Some(EnrollmentStatus::Dropped));
        assert_eq!(dropped, OfferingRelation::None);

        let waitlisted =
            resolve_relation(UserRole::Student, false, Some(EnrollmentStatus::Waitlisted));
        assert_eq!(waitlisted, OfferingRelation::None);

        let unenrolled = resolve_relation(UserRole::Student, false, None);
        assert_eq!(unenrolled, OfferingRelation::None);
    }

    #[test]
    fn student_in_staff_table_gains_nothing() {
        // A student cannot be promoted through the staff roster alone.
        let relation = resolve_relation(UserRole::Student, true, None);
        assert_eq!(relation, OfferingRelation::None);
    }
}
