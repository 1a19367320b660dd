use num_traits::One;
use pfdice::numeric::ratio;
use pfdice::*;

fn policy() -> EvalPolicy {
    EvalPolicy::default()
}

/// Longsword 1d8+4 with a ×2 critical on 19-20.
#[test]
fn test_longsword_attack() {
    let sword = DamageSpec::parse("1d8+4").unwrap();
    let attack = Attack::new(11, sword).threat_range(19);
    let dist = attack.distribution(&policy()).unwrap();

    assert!(dist.total_probability().is_one());
    assert_eq!(dist.probability(0), ratio(1, 2));
    assert_eq!(dist.min(), 0);
    assert_eq!(dist.max(), 20);
    // 5..=12 only on normal hits: (8/20 + 2/20 * 1/2) * 1/8
    assert_eq!(dist.probability(5), (ratio(8, 20) + ratio(1, 20)) * ratio(1, 8));
    // 20 only on a confirmed critical with two 8s
    assert_eq!(dist.probability(20), ratio(1, 20) * ratio(1, 64));
}

#[test]
fn test_expected_damage_matches_hand_calculation() {
    // hit on 11, threat 20 only: miss 1/2, hit 9/20, threat 1/20 (confirm 1/2)
    let attack = Attack::new(11, DamageSpec::parse("1d6+1").unwrap());
    let dist = attack.distribution(&policy()).unwrap();
    // hit mean 4.5, critical mean 8
    let expected = ratio(9, 20) * ratio(9, 2)
        + ratio(1, 20) * (ratio(1, 2) * ratio(8, 1) + ratio(1, 2) * ratio(9, 2));
    assert_eq!(dist.expectation(), expected);
}

#[test]
fn test_critical_multiplier_three() {
    let axe = DamageSpec::parse("1d12+3").unwrap().critical_multiplier(3);
    let policy = policy();
    let hit = axe.hit(&policy).unwrap();
    let crit = axe.critical(&policy).unwrap();
    assert_eq!(hit.expectation(), ratio(19, 2));
    assert_eq!(crit.expectation(), ratio(45, 2));
    assert_eq!((crit.min(), crit.max()), (6, 39));
}

#[test]
fn test_double_dice_keeps_same_mean() {
    let policy = policy();
    let extra = DamageSpec::parse("2d6+2").unwrap();
    let doubled = extra.clone().critical_mode(CriticalMode::DoubleDice);
    let a = extra.critical(&policy).unwrap();
    let b = doubled.critical(&policy).unwrap();
    assert_eq!(a.expectation(), b.expectation());
    assert!(b.variance() > a.variance());
}

#[test]
fn test_negative_modifier_floor() {
    let dagger = DamageSpec::parse("1d4-2").unwrap();
    let hit = dagger.hit(&policy()).unwrap();
    assert_eq!(hit.min(), 1);
    assert_eq!(hit.probability(1), ratio(3, 4));

    let unfloored = dagger.clone().minimum(None).hit(&policy()).unwrap();
    assert_eq!(unfloored.min(), -1);

    let custom = dagger.minimum(Some(0)).hit(&policy()).unwrap();
    assert_eq!(custom.probability(0), ratio(1, 2));
}

#[test]
fn test_damage_with_pool_operators() {
    let damage = DamageSpec::parse("2d6r1+1d6!+3").unwrap();
    let hit = damage.hit(&policy()).unwrap();
    assert!(hit.total_probability().is_one());
    assert_eq!(damage.flat(), &ExpressionNode::constant(3));
}

#[test]
fn test_full_attack_iteratives() {
    let sword = DamageSpec::parse("1d8+4").unwrap();
    let attacks = [
        Attack::new(8, sword.clone()).threat_range(19),
        Attack::new(13, sword).threat_range(19),
    ];
    let total = full_attack(&attacks, &policy()).unwrap();
    assert!(total.total_probability().is_one());

    let miss_both = ratio(7, 20) * ratio(12, 20);
    assert_eq!(total.probability(0), miss_both);

    let first = attacks[0].distribution(&policy()).unwrap();
    let second = attacks[1].distribution(&policy()).unwrap();
    assert_eq!(total, first.convolve(&second));
}

#[test]
fn test_empty_full_attack() {
    let total = full_attack(&[], &policy()).unwrap();
    assert_eq!(total, Distribution::point_mass(0));
}

#[test]
fn test_damage_errors_propagate() {
    assert!(matches!(
        DamageSpec::parse("1d8+"),
        Err(DiceError::ParseError { .. })
    ));

    let huge = DamageSpec::parse("5000d6").unwrap();
    assert!(matches!(
        huge.hit(&policy()),
        Err(DiceError::PoolSizeExceeded { .. })
    ));

    let attack = Attack::new(10, DamageSpec::parse("1d6").unwrap().critical_multiplier(0));
    assert!(matches!(
        attack.distribution(&policy()),
        Err(DiceError::InvalidOperatorArguments(_))
    ));
}
