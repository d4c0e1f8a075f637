pub mod billing;
pub mod customers;
pub mod dashboard;
pub mod deliveries;
pub mod invoice;
pub mod mailer;
pub mod orders;
pub mod production;
pub mod products;
pub mod work_centers;

use crate::errors::ServiceError;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, EntityTrait};

pub const MAX_PAGE_SIZE: u64 = 100;

const LIKE_ESCAPE: char = '\\';

/// `%term%` with the term's own `%`, `_` and escape characters taken literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring match on `entity.column`.
pub(crate) fn contains_ci<E, C>(entity: E, column: C, term: &str) -> SimpleExpr
where
    E: EntityTrait,
    C: ColumnTrait,
{
    Expr::expr(Func::lower(Expr::col((entity, column))))
        .like(LikeExpr::new(like_pattern(term)).escape(LIKE_ESCAPE))
}

pub(crate) fn check_page(page: u64, size: u64) -> Result<(), ServiceError> {
    if page == 0 {
        return Err(ServiceError::InvalidInput("page must be at least 1".into()));
    }
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ServiceError::InvalidInput(format!(
            "size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

pub(crate) fn page_count(total: u64, size: u64) -> u64 {
    if size == 0 {
        0
    } else {
        total.div_ceil(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn page_bounds() {
        assert!(check_page(1, 20).is_ok());
        assert!(check_page(3, MAX_PAGE_SIZE).is_ok());
        assert_matches!(check_page(0, 20), Err(ServiceError::InvalidInput(_)));
        assert_matches!(check_page(1, 0), Err(ServiceError::InvalidInput(_)));
        assert_matches!(check_page(1, 101), Err(ServiceError::InvalidInput(_)));
    }

    #[test]
    fn like_wildcards_in_search_terms_are_escaped() {
        assert_eq!(like_pattern("Hoodie"), "%hoodie%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
    }
}
