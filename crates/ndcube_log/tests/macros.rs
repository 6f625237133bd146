//! Applying macros relative to different reference grips on the 3^4
//! hypercube.

use ndcube_log::*;
use ndcube_puzzle::{Grip, PuzzleDescription, PuzzleState, Twist};
use pretty_assertions::assert_eq;

fn hypercube() -> PuzzleDescription {
    PuzzleDescription::build("{4,3,3}", "3").expect("hypercube should build")
}

fn pick_refs(p: &PuzzleDescription) -> [Grip; MAX_REFS] {
    let mut refs = vec![];
    for (grip, _) in p.grips().iter() {
        if refs.len() < MAX_REFS && Macro::is_valid_ref(p, &refs, grip) {
            refs.push(grip);
        }
    }
    refs.try_into().expect("not enough valid reference grips")
}

fn twistable(p: &PuzzleDescription) -> Vec<Grip> {
    p.grips()
        .iter()
        .filter(|(_, info)| info.order > 1)
        .map(|(grip, _)| grip)
        .collect()
}

fn recorded_macro(p: &PuzzleDescription, refs: [Grip; MAX_REFS]) -> Macro {
    let grips = twistable(p);
    let mut m = Macro::new("test", p.prescription().to_string(), refs);
    m.add_move(Twist::new(grips[0], CCW, 1));
    m.add_move(Twist::new(grips[7], CW, 2));
    m.add_move(Twist::new(grips[30], CCW, 1));
    m
}

#[test]
fn test_reference_validation() {
    let p = hypercube();
    let refs = pick_refs(&p);

    // A grip at the center of its face.
    let face_center_grip = p
        .grips()
        .iter()
        .find(|(_, info)| info.dim == 3)
        .map(|(grip, _)| grip)
        .unwrap();
    assert!(!Macro::is_valid_ref(&p, &[], face_center_grip));
    assert!(!Macro::is_valid_ref(&p, &refs[..1], refs[0]));
    assert!(!Macro::is_valid_ref(&p, &refs, refs[0]));
    assert!(!Macro::is_valid_ref(&p, &[], Grip(100_000)));
}

#[test]
fn test_apply_macro_to_same_refs() {
    let p = hypercube();
    let refs = pick_refs(&p);
    let m = recorded_macro(&p, refs);
    let expected = m
        .moves
        .iter()
        .filter_map(|node| match node {
            HistoryNode::Move(twist) => Some(twist),
            HistoryNode::Mark(_) => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(m.get_twists(&refs, &p).unwrap(), expected);
}

#[test]
fn test_apply_macro_to_rotated_refs() {
    let p = hypercube();
    let refs = pick_refs(&p);
    let m = recorded_macro(&p, refs);

    let rotation_grip = twistable(&p)[3];
    let rotation = p.twist_matrix(rotation_grip, CCW, 1.0).unwrap();
    let rotate_grip = |g: Grip| p.nearest_grip(&rotation * &p.grips()[g].center).unwrap();

    let app_refs = refs.map(rotate_grip);
    let twists = m.get_twists(&app_refs, &p).unwrap();
    let expected = m
        .moves
        .moves()
        .into_iter()
        .map(|t| Twist::new(rotate_grip(t.grip), t.dir, t.slice_mask))
        .collect::<Vec<_>>();
    assert_eq!(twists, expected);

    // Applying the macro before or after rotating the whole puzzle gives the
    // same result.
    let mut a = PuzzleState::new(&p);
    for t in m.moves.moves() {
        a.twist(&p, t).unwrap();
    }
    a.twist(&p, Twist::new(rotation_grip, CCW, -1)).unwrap();

    let mut b = PuzzleState::new(&p);
    b.twist(&p, Twist::new(rotation_grip, CCW, -1)).unwrap();
    for t in twists {
        b.twist(&p, t).unwrap();
    }
    assert_eq!(a, b);
}

#[test]
fn test_apply_macro_to_mismatched_refs() {
    let p = hypercube();
    let refs = pick_refs(&p);
    let m = recorded_macro(&p, refs);

    let swapped = [refs[0], refs[0], refs[2]];
    assert_eq!(
        m.get_twists(&swapped, &p),
        Err(MacroError::ReferenceMismatch)
    );
    assert_eq!(
        m.get_twists(&[refs[0], refs[1], Grip(100_000)], &p),
        Err(MacroError::BadReference(100_000)),
    );
}
