//! CNAE division → NR-5 risk group table
//!
//! One row per group. Each row lists the two-digit CNAE divisions it covers and
//! the seat band set applied to it. Divisions absent from every row (agriculture,
//! covered by NR-31) have no group and fall back to a designated officer.

use super::bands::BandSet;
use serde::Serialize;

/// NR-5 risk group row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Nr5Group {
    /// Group code, "C-1" … "C-35"
    pub code: &'static str,
    pub description: &'static str,
    /// Two-digit CNAE divisions mapped to this group
    pub divisions: &'static [u8],
    pub bands: BandSet,
}

use BandSet::{Generic, LowRiskCommercial, StandardIndustrial};

pub const NR5_GROUPS: &[Nr5Group] = &[
    Nr5Group { code: "C-1", description: "Extração de minerais", divisions: &[5, 6, 7, 8, 9], bands: StandardIndustrial },
    Nr5Group { code: "C-2", description: "Alimentos e bebidas", divisions: &[10, 11], bands: StandardIndustrial },
    Nr5Group { code: "C-3", description: "Produtos do fumo", divisions: &[12], bands: StandardIndustrial },
    Nr5Group { code: "C-4", description: "Têxteis", divisions: &[13], bands: StandardIndustrial },
    Nr5Group { code: "C-5", description: "Vestuário, couro e calçados", divisions: &[14, 15], bands: StandardIndustrial },
    Nr5Group { code: "C-6", description: "Madeira", divisions: &[16], bands: StandardIndustrial },
    Nr5Group { code: "C-7", description: "Papel, celulose e impressão", divisions: &[17, 18], bands: StandardIndustrial },
    Nr5Group { code: "C-8", description: "Derivados de petróleo e biocombustíveis", divisions: &[19], bands: StandardIndustrial },
    Nr5Group { code: "C-9", description: "Produtos químicos", divisions: &[20], bands: StandardIndustrial },
    Nr5Group { code: "C-10", description: "Produtos farmoquímicos e farmacêuticos", divisions: &[21], bands: StandardIndustrial },
    Nr5Group { code: "C-11", description: "Borracha e material plástico", divisions: &[22], bands: StandardIndustrial },
    Nr5Group { code: "C-12", description: "Minerais não metálicos", divisions: &[23], bands: StandardIndustrial },
    Nr5Group { code: "C-13", description: "Metalurgia", divisions: &[24], bands: StandardIndustrial },
    Nr5Group { code: "C-14", description: "Produtos de metal", divisions: &[25], bands: StandardIndustrial },
    Nr5Group { code: "C-15", description: "Equipamentos eletrônicos e elétricos", divisions: &[26, 27], bands: StandardIndustrial },
    Nr5Group { code: "C-16", description: "Máquinas e equipamentos", divisions: &[28], bands: StandardIndustrial },
    Nr5Group { code: "C-17", description: "Veículos e equipamentos de transporte", divisions: &[29, 30], bands: StandardIndustrial },
    Nr5Group { code: "C-18", description: "Móveis, produtos diversos e manutenção industrial", divisions: &[31, 32, 33], bands: StandardIndustrial },
    Nr5Group { code: "C-19", description: "Eletricidade e gás", divisions: &[35], bands: StandardIndustrial },
    Nr5Group { code: "C-20", description: "Água, esgoto e gestão de resíduos", divisions: &[36, 37, 38, 39], bands: StandardIndustrial },
    Nr5Group { code: "C-21", description: "Construção", divisions: &[41, 42, 43], bands: StandardIndustrial },
    Nr5Group { code: "C-22", description: "Comércio e reparação de veículos", divisions: &[45], bands: LowRiskCommercial },
    Nr5Group { code: "C-23", description: "Comércio atacadista", divisions: &[46], bands: LowRiskCommercial },
    Nr5Group { code: "C-24", description: "Comércio varejista", divisions: &[47], bands: LowRiskCommercial },
    Nr5Group { code: "C-25", description: "Transporte terrestre", divisions: &[49], bands: Generic },
    Nr5Group { code: "C-26", description: "Transporte aquaviário e aéreo", divisions: &[50, 51], bands: Generic },
    Nr5Group { code: "C-27", description: "Armazenagem e correio", divisions: &[52, 53], bands: Generic },
    Nr5Group { code: "C-28", description: "Alojamento e alimentação", divisions: &[55, 56], bands: Generic },
    Nr5Group { code: "C-29", description: "Informação e comunicação", divisions: &[58, 59, 60, 61, 62, 63], bands: LowRiskCommercial },
    Nr5Group { code: "C-30", description: "Atividades financeiras e seguros", divisions: &[64, 65, 66], bands: LowRiskCommercial },
    Nr5Group { code: "C-31", description: "Atividades imobiliárias, profissionais e técnicas", divisions: &[68, 69, 70, 71, 72, 73, 74, 75], bands: LowRiskCommercial },
    Nr5Group { code: "C-32", description: "Serviços administrativos e complementares", divisions: &[77, 78, 79, 80, 81, 82], bands: Generic },
    Nr5Group { code: "C-33", description: "Administração pública e educação", divisions: &[84, 85], bands: Generic },
    Nr5Group { code: "C-34", description: "Saúde humana e serviços sociais", divisions: &[86, 87, 88], bands: Generic },
    Nr5Group { code: "C-35", description: "Artes, organizações associativas e serviços pessoais", divisions: &[90, 91, 92, 93, 94, 95, 96, 97, 99], bands: Generic },
];

/// Extract the CNAE division: the first two digits, ignoring punctuation
pub fn cnae_division(cnae: &str) -> Option<u8> {
    let mut digits = cnae.chars().filter(|c| c.is_ascii_digit());
    let tens = digits.next()?.to_digit(10)?;
    let units = digits.next()?.to_digit(10)?;
    Some((tens * 10 + units) as u8)
}

/// Risk group for a CNAE code, `None` when the division is not covered
pub fn group_for_cnae(cnae: &str) -> Option<&'static Nr5Group> {
    let division = cnae_division(cnae)?;
    NR5_GROUPS.iter().find(|g| g.divisions.contains(&division))
}

/// Risk group by its code ("C-24")
pub fn group_by_code(code: &str) -> Option<&'static Nr5Group> {
    NR5_GROUPS
        .iter()
        .find(|g| g.code.eq_ignore_ascii_case(code.trim()))
}
