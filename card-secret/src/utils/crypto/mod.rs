// Copyright 2023 Ant Group Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod aes_gcm;
pub mod decrypter;
pub mod encrypter;
pub mod rsa;

#[cfg(test)]
mod test {
    use openssl::rsa::Rsa;

    use crate::utils::crypto::rsa::{RsaPrivateKeyHolder, RsaPublicKeyHolder};
    use crate::utils::crypto::{decrypter::Decrypter, encrypter::Encrypter};
    use card_types::*;
    use std::str;

    #[test]
    fn rsa() {
        let rsa = Rsa::generate(2048).expect("create rsa key pair failed");
        let rsa_public_key_pem = rsa.public_key_to_pem().unwrap();
        let rsa_private_key_pem = rsa.private_key_to_pem().unwrap();

        let buffer = "AAECAwQFBgcICQoLDA0ODw==".as_bytes();
        let encryptor =
            RsaPublicKeyHolder::from_pem(str::from_utf8(&rsa_public_key_pem).unwrap()).unwrap();

        let decryptor = RsaPrivateKeyHolder::private_key_from_pem(
            str::from_utf8(&rsa_private_key_pem).unwrap(),
        )
        .unwrap();

        let enc_data = encryptor.encrypt(buffer).unwrap();
        assert_eq!(enc_data.len(), 256);
        let dec_data = decryptor.decrypt(&enc_data).unwrap();
        assert_eq!(buffer, dec_data);
    }

    #[test]
    fn rsa_pkcs1_pem() {
        let rsa = Rsa::generate(2048).expect("create rsa key pair failed");
        let rsa_public_key_pem = rsa.public_key_to_pem_pkcs1().unwrap();
        let rsa_private_key_pem = rsa.private_key_to_pem().unwrap();

        let encryptor =
            RsaPublicKeyHolder::from_pem(str::from_utf8(&rsa_public_key_pem).unwrap()).unwrap();
        assert_eq!(encryptor.bits(), 2048);
        let decryptor = RsaPrivateKeyHolder::private_key_from_pem_pkcs1(
            str::from_utf8(&rsa_private_key_pem).unwrap(),
        )
        .unwrap();

        let enc_data = encryptor.encrypt(b"hello").unwrap();
        assert_eq!(decryptor.decrypt(&enc_data).unwrap(), b"hello");
    }

    #[test]
    fn oaep_is_probabilistic() {
        let rsa = Rsa::generate(2048).expect("create rsa key pair failed");
        let pem = rsa.public_key_to_pem().unwrap();
        let encryptor = RsaPublicKeyHolder::from_pem(str::from_utf8(&pem).unwrap()).unwrap();
        assert_ne!(
            encryptor.encrypt(b"same").unwrap(),
            encryptor.encrypt(b"same").unwrap()
        );
    }

    #[test]
    fn wrong_private_key_fails() {
        let rsa = Rsa::generate(2048).expect("create rsa key pair failed");
        let other = Rsa::generate(2048).expect("create rsa key pair failed");
        let pem = rsa.public_key_to_pem().unwrap();
        let other_pem = other.private_key_to_pem().unwrap();
        let encryptor = RsaPublicKeyHolder::from_pem(str::from_utf8(&pem).unwrap()).unwrap();
        let decryptor =
            RsaPrivateKeyHolder::private_key_from_pem(str::from_utf8(&other_pem).unwrap())
                .unwrap();
        let enc_data = encryptor.encrypt(b"hello").unwrap();
        let err = decryptor.decrypt(&enc_data).unwrap_err();
        assert_eq!(err.errno(), CardStatus::AuthenticationFailure);
    }

    #[test]
    fn malformed_pem_is_key_configuration_error() {
        let err = RsaPublicKeyHolder::from_pem("-----BEGIN PUBLIC KEY-----\nAAAA\n").unwrap_err();
        assert_eq!(err.errno(), CardStatus::KeyConfigurationError);
        let err = RsaPublicKeyHolder::from_pem("-----BEGIN RSA PUBLIC KEY-----\n").unwrap_err();
        assert_eq!(err.errno(), CardStatus::KeyConfigurationError);
    }

    #[test]
    fn non_rsa_key_is_rejected() {
        use openssl::ec::{EcGroup, EcKey};
        use openssl::nid::Nid;
        use openssl::pkey::PKey;

        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        let pem = ec.public_key_to_pem().unwrap();
        let err = RsaPublicKeyHolder::from_pem(str::from_utf8(&pem).unwrap()).unwrap_err();
        assert_eq!(err.errno(), CardStatus::KeyConfigurationError);
    }
}
